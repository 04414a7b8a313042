use propbench::{
    boot,
    cli::{self, actions, config::ConsoleConfig, watch},
};

fn main() {
    let matches = cli::parse_args();
    let watching = matches.get_flag("watch");

    match boot::log_file_path().filter(|_| watching) {
        Some(path) => {
            if let Err(err) = boot::init_watch_logger(&path) {
                eprintln!("Failed to initialize log file '{path}': {err}");
                env_logger::init();
            }
        }
        None => boot::init_common(),
    }

    let config = match ConsoleConfig::load(matches.get_one::<String>("config").map(String::as_str))
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(2);
        }
    };

    let code = match actions::run_one_shot(&matches, &config) {
        Ok(one_shot) if watching => match watch::start(&config) {
            Ok(()) => one_shot.unwrap_or(0),
            Err(err) => {
                log::error!("Console stopped: {err:#}");
                eprintln!("{err:#}");
                1
            }
        },
        Ok(Some(code)) => code,
        Ok(None) => {
            if let Err(err) = cli::build_command().print_help() {
                eprintln!("{err}");
            }
            0
        }
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("{err:#}");
            1
        }
    };
    std::process::exit(code);
}
