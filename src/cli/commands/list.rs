use crate::backup::inventory::Inventory;
use crate::backup::BackupRoll;
use crate::cli::commands::{EXIT_FAILED, EXIT_OK};
use crate::error::Result;
use crate::timestamp::TimestampCodec;
use crate::types::Tier;

pub fn run_list(roll: &BackupRoll, worlds: &[String], codec: &TimestampCodec) -> Result<i32> {
    let mut code = EXIT_OK;
    for world in worlds {
        match roll.inventory(world) {
            Ok(inventory) => print!("{}", render(&inventory, roll, codec)),
            Err(err) => {
                eprintln!("{}: {}", world, err);
                code = EXIT_FAILED;
            }
        }
    }
    Ok(code)
}

fn render(inventory: &Inventory, roll: &BackupRoll, codec: &TimestampCodec) -> String {
    let policy = roll.worlds().get(&inventory.world).copied().flatten();
    let mut out = format!("world: {}\n", inventory.world);
    if policy.is_none() {
        out.push_str("  (not rotated)\n");
    }
    for tier in Tier::ALL {
        let backups = inventory.tier(tier);
        match policy.filter(|_| !tier.is_manual()) {
            Some(policy) => out.push_str(&format!(
                "  {} ({}/{}):\n",
                tier,
                backups.len(),
                policy.limit(tier)
            )),
            None => out.push_str(&format!("  {} ({}):\n", tier, backups.len())),
        }
        for backup in backups {
            out.push_str(&format!("    {}\n", backup.name));
        }
    }
    for path in &inventory.in_progress {
        out.push_str(&format!("  unfinished: {}\n", path.display()));
    }
    for path in &inventory.skipped {
        out.push_str(&format!(
            "  ignored (not {}): {}\n",
            codec.format(),
            path.display()
        ));
    }
    out
}
