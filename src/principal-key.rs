//! A small operator tool that issues login keys.
//! Keys are derived exactly as the server checks them, so the server's
//! `hmac_secret` must be supplied.

use clap::{Arg, ArgAction, ArgMatches, Command};

use partyvote_backend::model::{api::auth::login_key, common::Principal};

const PROGRAM_NAME: &str = "principal-key";

const ABOUT_TEXT: &str = "Print the login key for a principal.

Output is one line: the principal, a space, and its key.
With no PRINCIPAL, a fresh random principal is generated.";

const PRINCIPAL: &str = "PRINCIPAL";
const SECRET: &str = "secret";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(PRINCIPAL)
                .help("A 0x-prefixed, 40 hex digit principal")
                .value_parser(clap::value_parser!(String))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(SECRET)
                .long(SECRET)
                .short('s')
                .help("The server's `hmac_secret`")
                .action(ArgAction::Set)
                .required(true),
        )
}

/// Issue the key, returning the line to print.
fn run(args: &ArgMatches) -> Result<String, String> {
    let secret: &String = args.get_one(SECRET).ok_or("Missing --secret")?;
    let principal = match args.get_one::<String>(PRINCIPAL) {
        Some(principal) => principal
            .parse::<Principal>()
            .map_err(|err| format!("Invalid principal {principal}: {err}"))?,
        None => Principal::random(),
    };
    let key = login_key(&principal, secret.as_bytes());
    Ok(format!("{principal} {key}"))
}

fn main() {
    let args = cli().get_matches();
    match run(&args) {
        Ok(line) => println!("{line}"),
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "0x0101010101010101010101010101010101010101";

    #[test]
    fn issues_key_for_given_principal() {
        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, ROOT, "--secret", "hunter2"])
            .unwrap();
        let line = run(&args).unwrap();
        let principal: Principal = ROOT.parse().unwrap();
        assert_eq!(
            line,
            format!("{ROOT} {}", login_key(&principal, b"hunter2"))
        );
    }

    #[test]
    fn generates_random_principal() {
        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, "-s", "hunter2"])
            .unwrap();
        let line = run(&args).unwrap();
        let (principal, key) = line.split_once(' ').unwrap();
        let principal: Principal = principal.parse().unwrap();
        assert_eq!(key, login_key(&principal, b"hunter2"));
    }

    #[test]
    fn rejects_bad_input() {
        cli()
            .try_get_matches_from([PROGRAM_NAME, ROOT])
            .unwrap_err();
        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, "0x12", "-s", "hunter2"])
            .unwrap();
        assert!(run(&args).is_err());
    }
}
