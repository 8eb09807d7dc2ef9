//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use kinship_types::EntityKind;
use uuid::Uuid;

/// Inspect and maintain the Kinship event log.
#[derive(Parser, Debug)]
#[command(name = "kinship-admin")]
#[command(about = "Projections and clone resolution over the Kinship event log")]
#[command(version)]
pub struct Args {
    /// Path to the YAML configuration file. Defaults apply if it is missing.
    #[arg(short, long, default_value = "kinship.yaml", env = "KINSHIP_CONFIG")]
    pub config: PathBuf,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// One operation; each prints a JSON document on stdout.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the family an entity belongs to.
    FamilyOf {
        /// Entity kind.
        #[arg(value_enum)]
        kind: KindArg,
        /// Entity ID.
        id: Uuid,
    },

    /// Print the canonical original of an entity.
    OriginalOf {
        /// Entity kind.
        #[arg(value_enum)]
        kind: ShareableKind,
        /// Entity ID.
        id: Uuid,
    },

    /// Print every entity sharing an original with the given one.
    ClonesOf {
        /// Entity kind.
        #[arg(value_enum)]
        kind: ShareableKind,
        /// Entity ID.
        id: Uuid,
    },

    /// Return the entity's ID in a family, cloning it there if needed.
    EnsureClone {
        /// Entity kind.
        #[arg(value_enum)]
        kind: ShareableKind,
        /// Entity ID.
        id: Uuid,
        /// Target family.
        #[arg(long)]
        family: Uuid,
        /// User performing the share.
        #[arg(long)]
        user: Uuid,
    },

    /// Print the current projected state of an entity.
    Profile {
        /// Entity kind.
        #[arg(value_enum)]
        kind: KindArg,
        /// Entity ID.
        id: Uuid,
    },

    /// Print a user's families and current family.
    FamiliesOfUser {
        /// User ID.
        user: Uuid,
    },

    /// Print the users currently in a family.
    MembersOf {
        /// Family ID.
        family: Uuid,
    },

    /// Append one event given its tag and JSON payload.
    Append {
        /// Event tag, e.g. `PersonAdded`.
        event_type: String,
        /// Payload object as JSON.
        payload: String,
    },

    /// Print the backend name and event count.
    Stats,
}

/// Any entity kind.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    /// A person.
    Person,
    /// A photo.
    Photo,
    /// A thread.
    Thread,
    /// A family.
    Family,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Person => Self::Person,
            KindArg::Photo => Self::Photo,
            KindArg::Thread => Self::Thread,
            KindArg::Family => Self::Family,
        }
    }
}

/// Entity kinds that can be cloned across families.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareableKind {
    /// A person.
    Person,
    /// A photo.
    Photo,
    /// A thread.
    Thread,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_ensure_clone() {
        let id = Uuid::now_v7();
        let family = Uuid::now_v7();
        let user = Uuid::now_v7();
        let args = Args::try_parse_from([
            "kinship-admin",
            "ensure-clone",
            "photo",
            &id.to_string(),
            "--family",
            &family.to_string(),
            "--user",
            &user.to_string(),
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("kinship.yaml"));
        assert_eq!(
            args.command,
            Command::EnsureClone {
                kind: ShareableKind::Photo,
                id,
                family,
                user
            }
        );
    }

    #[test]
    fn families_cannot_be_cloned() {
        let result = Args::try_parse_from([
            "kinship-admin",
            "clones-of",
            "family",
            &Uuid::now_v7().to_string(),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_ids() {
        let result = Args::try_parse_from(["kinship-admin", "family-of", "person", "not-a-uuid"]);
        assert!(result.is_err());
    }
}
