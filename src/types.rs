use std::fmt;
use std::str::FromStr;

/// Retention group of a backup. The rotated tiers come first, ordered from
/// densest to sparsest; `PreUpdate` and `Reverted` are kept by hand and never
/// rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Recent,
    Daily,
    Weekly,
    Monthly,
    PreUpdate,
    Reverted,
}

impl Tier {
    pub const ROTATED: [Tier; 4] = [Tier::Recent, Tier::Daily, Tier::Weekly, Tier::Monthly];
    pub const MANUAL: [Tier; 2] = [Tier::PreUpdate, Tier::Reverted];
    pub const ALL: [Tier; 6] = [
        Tier::Recent,
        Tier::Daily,
        Tier::Weekly,
        Tier::Monthly,
        Tier::PreUpdate,
        Tier::Reverted,
    ];

    /// The next coarser tier, or `None` for the terminal tier and the
    /// manual groups.
    pub fn successor(self) -> Option<Tier> {
        match self {
            Tier::Recent => Some(Tier::Daily),
            Tier::Daily => Some(Tier::Weekly),
            Tier::Weekly => Some(Tier::Monthly),
            Tier::Monthly | Tier::PreUpdate | Tier::Reverted => None,
        }
    }

    pub fn is_manual(self) -> bool {
        matches!(self, Tier::PreUpdate | Tier::Reverted)
    }

    /// Name of the tier's sub-directory under a world's backup folder.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Recent => "recent",
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
            Tier::PreUpdate => "pre-update",
            Tier::Reverted => "reverted",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(Tier::Recent),
            "daily" => Ok(Tier::Daily),
            "weekly" => Ok(Tier::Weekly),
            "monthly" => Ok(Tier::Monthly),
            "pre-update" => Ok(Tier::PreUpdate),
            "reverted" => Ok(Tier::Reverted),
            _ => Err(format!(
                "invalid tier {}; expected recent, daily, weekly, monthly, pre-update or reverted",
                s
            )),
        }
    }
}

/// Lifecycle point at which a configured shell command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    PreBackup,
    PostBackup,
    FailBackup,
    PreRestore,
    PostRestore,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::PreBackup => "pre-backup",
            HookKind::PostBackup => "post-backup",
            HookKind::FailBackup => "fail-backup",
            HookKind::PreRestore => "pre-restore",
            HookKind::PostRestore => "post-restore",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub dry_run: bool,
    pub safe_mode: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyMethod {
    #[default]
    Rsync,
    Copy,
}

impl CopyMethod {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rsync" => Ok(CopyMethod::Rsync),
            "copy" => Ok(CopyMethod::Copy),
            _ => Err(format!(
                "invalid copy method {}; expected rsync or copy",
                value
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CopyMethod::Rsync => "rsync",
            CopyMethod::Copy => "copy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_chain_ends_at_monthly() {
        let mut chain = vec![Tier::Recent];
        while let Some(next) = chain.last().and_then(|t| t.successor()) {
            chain.push(next);
        }
        assert_eq!(chain, Tier::ROTATED.to_vec());
        assert!(Tier::MANUAL.iter().all(|t| t.successor().is_none() && t.is_manual()));
        assert!(!Tier::Monthly.is_manual());
    }

    #[test]
    fn tier_parses_directory_names() {
        for tier in Tier::ALL {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert!("hourly".parse::<Tier>().is_err());
    }
}
