pub mod actions;
pub mod config;
pub mod ui;
pub mod watch;

use clap::{Arg, ArgMatches, Command};

pub fn build_command() -> Command {
    Command::new("propbench")
        .about("Bench-test console for motor/propeller combinations")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a TOML config file")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .help("Print the effective configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .short('l')
                .help("List all available serial ports and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .help("Output one-shot results in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check-port")
                .long("check-port")
                .help("Send TEST to PORT and report whether the device answers OK")
                .value_name("PORT")
                .conflicts_with_all(["run-test", "watch"]),
        )
        .arg(
            Arg::new("run-test")
                .long("run-test")
                .help("Send START to PORT and report whether the run was accepted")
                .value_name("PORT")
                .conflicts_with_all(["check-port", "watch"]),
        )
        .arg(
            Arg::new("acquire")
                .long("acquire")
                .short('a')
                .help("With --run-test: collect the sample stream and plot it")
                .requires("run-test")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("history")
                .long("history")
                .help("Print the test history log")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed-history")
                .long("seed-history")
                .help("Write demo history records if the log does not exist")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("engines")
                .long("engines")
                .help("List engine catalog names")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("propellers")
                .long("propellers")
                .help("List propeller catalog names")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("add-engine")
                .long("add-engine")
                .help("Append an engine: name,brand,model,power,weight,other")
                .value_name("CSV"),
        )
        .arg(
            Arg::new("add-propeller")
                .long("add-propeller")
                .help("Append a propeller: name,brand,model,diameter,weight,other")
                .value_name("CSV"),
        )
        .arg(
            Arg::new("watch")
                .long("watch")
                .short('w')
                .help("Run the interactive console: live history and stdin commands")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_requires_run_test() {
        let cmd = build_command();
        assert!(cmd
            .clone()
            .try_get_matches_from(["propbench", "--acquire"])
            .is_err());
        let m = cmd
            .try_get_matches_from(["propbench", "--run-test", "COM3", "--acquire"])
            .unwrap();
        assert_eq!(m.get_one::<String>("run-test").map(String::as_str), Some("COM3"));
        assert!(m.get_flag("acquire"));
    }

    #[test]
    fn check_and_run_are_exclusive() {
        assert!(build_command()
            .try_get_matches_from(["propbench", "--check-port", "A", "--run-test", "B"])
            .is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        build_command().debug_assert();
    }
}
