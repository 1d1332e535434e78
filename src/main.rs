use backuproll::cli;
use backuproll::BackuprollError;

fn main() {
    match cli::run() {
        Ok(code) => std::process::exit(code),
        Err(err) => match err.downcast_ref::<BackuprollError>() {
            Some(err) => cli::exit_for_error(err),
            None => {
                eprintln!("{:#}", err);
                std::process::exit(cli::EXIT_USAGE);
            }
        },
    }
}
