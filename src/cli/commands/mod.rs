pub mod list;
pub mod restore;
pub mod summary;

use crate::error::BackuprollError;

pub const EXIT_OK: i32 = 0;
/// At least one world failed.
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_LOCKED: i32 = 3;

pub fn exit_code(err: &BackuprollError) -> i32 {
    match err {
        BackuprollError::Config(_) => EXIT_USAGE,
        BackuprollError::Lock(_) => EXIT_LOCKED,
        _ => EXIT_FAILED,
    }
}

pub fn exit_for_error(err: &BackuprollError) -> ! {
    eprintln!("{}", err);
    std::process::exit(exit_code(err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn errors_map_to_exit_codes() {
        assert_eq!(exit_code(&ConfigError::Invalid("x".into()).into()), EXIT_USAGE);
        assert_eq!(exit_code(&BackuprollError::Lock("held".into())), EXIT_LOCKED);
        assert_eq!(exit_code(&BackuprollError::message("copy failed")), EXIT_FAILED);
    }
}
