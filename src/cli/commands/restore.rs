use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::backup::lifecycle::RestoreOptions;
use crate::backup::BackupRoll;
use crate::cli::args::{ExportArgs, PickArgs, RestoreArgs};
use crate::cli::commands::EXIT_OK;
use crate::error::{ConfigError, Result};
use crate::selector::{select_worlds, BackupSelector};
use crate::timestamp::TimestampCodec;

const BEFORE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

pub fn run_restore(roll: &BackupRoll, codec: &TimestampCodec, args: &RestoreArgs) -> Result<i32> {
    let (world, selector) = pick(roll, codec, &args.pick)?;
    let options = RestoreOptions {
        subdir: args.pick.subdir.clone(),
        pre_hook: !args.no_pre_hook,
        post_hook: !args.no_post_hook,
    };
    let restored = roll.do_restore(&world, &selector, &options)?;
    if let Some(failure) = &restored.post_hook {
        warn!("{}", failure);
    }
    println!(
        "restored {} from {} backup {}",
        world, restored.backup.tier, restored.backup.name
    );
    Ok(EXIT_OK)
}

pub fn run_export(roll: &BackupRoll, codec: &TimestampCodec, args: &ExportArgs) -> Result<i32> {
    let (world, selector) = pick(roll, codec, &args.pick)?;
    let backup = roll.do_export(&world, &selector, args.pick.subdir.as_deref(), &args.output)?;
    println!(
        "exported {} backup {} of {} to {}",
        backup.tier,
        backup.name,
        world,
        args.output.display()
    );
    Ok(EXIT_OK)
}

fn pick(roll: &BackupRoll, codec: &TimestampCodec, args: &PickArgs) -> Result<(String, BackupSelector)> {
    let world = select_worlds(roll.worlds(), std::slice::from_ref(&args.world), false)?
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::Invalid("no world selected".to_string()))?;
    let selector = match (&args.name, &args.before) {
        (Some(name), _) => BackupSelector::Exact(name.clone()),
        (None, Some(before)) => BackupSelector::Before(parse_before(codec, before)?),
        (None, None) => BackupSelector::Latest,
    };
    Ok((world, selector))
}

/// Accepts a backup name, an ISO-like timestamp, or a bare date meaning the
/// end of that day.
pub fn parse_before(codec: &TimestampCodec, text: &str) -> Result<NaiveDateTime> {
    if let Ok(time) = codec.decode(text) {
        return Ok(time);
    }
    for format in BEFORE_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(time);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .ok_or_else(|| ConfigError::Invalid(format!("--before {}: not a timestamp", text)).into())
}
