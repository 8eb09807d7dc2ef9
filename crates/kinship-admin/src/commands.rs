//! Command handlers. Each returns the JSON document to print.

use kinship_core::{CloneResolver, LogProfilePictureLookup, NoopVisibilityIndex, Projector};
use kinship_log::EventLog;
use kinship_types::{
    EntityKind, EventPayload, EventType, FamilyId, NewEvent, PersonId, PhotoId, Shareable,
    ThreadId, UserId,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::cli::{Command, KindArg, ShareableKind};
use crate::error::AdminError;

type Resolver<'a> = CloneResolver<'a, LogProfilePictureLookup<'a>, NoopVisibilityIndex>;

/// Dispatch a shareable-kind command to its typed handler.
macro_rules! by_kind {
    ($kind:expr, $handler:ident($($arg:expr),*)) => {
        match $kind {
            ShareableKind::Person => $handler::<PersonId>($($arg),*).await,
            ShareableKind::Photo => $handler::<PhotoId>($($arg),*).await,
            ShareableKind::Thread => $handler::<ThreadId>($($arg),*).await,
        }
    };
}

/// Run `command` against `log`.
pub async fn run(command: Command, log: &EventLog, max_depth: usize) -> Result<Value, AdminError> {
    let faces = LogProfilePictureLookup::new(log);
    let resolver: Resolver<'_> =
        CloneResolver::new(log, &faces, &NoopVisibilityIndex).with_max_depth(max_depth);
    let projector = resolver.projector();

    match command {
        Command::FamilyOf { kind, id } => {
            let family = projector.family_of(EntityKind::from(kind), id).await?;
            Ok(json!({ "familyId": family }))
        }
        Command::OriginalOf { kind, id } => by_kind!(kind, original_of(&resolver, id)),
        Command::ClonesOf { kind, id } => by_kind!(kind, clones_of(&resolver, id)),
        Command::EnsureClone {
            kind,
            id,
            family,
            user,
        } => by_kind!(
            kind,
            ensure_clone(&resolver, id, FamilyId::from(family), UserId::from(user))
        ),
        Command::Profile { kind, id } => profile(&projector, kind, id).await,
        Command::FamiliesOfUser { user } => {
            let user = UserId::from(user);
            let families = projector.families_of_user(user).await?;
            let current = projector.current_family_of_user(user).await?;
            Ok(json!({ "families": families, "currentFamily": current }))
        }
        Command::MembersOf { family } => {
            let members = projector.members_of_family(FamilyId::from(family)).await?;
            Ok(json!({ "members": members }))
        }
        Command::Append {
            event_type,
            payload,
        } => append(&resolver, log, &event_type, &payload).await,
        Command::Stats => {
            let events = log.len().await?;
            Ok(json!({ "backend": log.backend(), "events": events }))
        }
    }
}

async fn original_of<I: Shareable + Serialize>(
    resolver: &Resolver<'_>,
    id: Uuid,
) -> Result<Value, AdminError> {
    let original = resolver.original_of(I::from(id)).await?;
    Ok(serde_json::to_value(original)?)
}

async fn clones_of<I: Shareable + Serialize>(
    resolver: &Resolver<'_>,
    id: Uuid,
) -> Result<Value, AdminError> {
    let set = resolver.clones_of(I::from(id)).await?;
    Ok(json!({ "original": set.original(), "members": set.members() }))
}

async fn ensure_clone<I: Shareable + Serialize>(
    resolver: &Resolver<'_>,
    id: Uuid,
    family: FamilyId,
    user: UserId,
) -> Result<Value, AdminError> {
    let resolved = resolver
        .ensure_clone_in_family(I::from(id), family, user)
        .await?;
    Ok(json!({ "id": resolved, "familyId": family }))
}

async fn profile(projector: &Projector<'_>, kind: KindArg, id: Uuid) -> Result<Value, AdminError> {
    let value = match kind {
        KindArg::Person => serde_json::to_value(projector.person_profile(id.into()).await?)?,
        KindArg::Photo => serde_json::to_value(projector.photo_details(id.into()).await?)?,
        KindArg::Thread => serde_json::to_value(projector.thread_details(id.into()).await?)?,
        KindArg::Family => serde_json::to_value(projector.family_details(id.into()).await?)?,
    };
    Ok(value)
}

async fn append(
    resolver: &Resolver<'_>,
    log: &EventLog,
    event_type: &str,
    payload: &str,
) -> Result<Value, AdminError> {
    let event_type: EventType = event_type.parse().map_err(|e| AdminError::Input {
        message: format!("{e}"),
    })?;
    let raw: Value = serde_json::from_str(payload).map_err(|e| AdminError::Input {
        message: format!("payload is not JSON: {e}"),
    })?;
    let typed = EventPayload::decode(event_type, &raw).map_err(|e| AdminError::Input {
        message: format!("payload does not match {event_type}: {e}"),
    })?;

    let mut event = NewEvent::from_payload(&typed).map_err(kinship_log::LogError::from)?;
    // Imported clones take the same key as resolver-made ones.
    if let Some(link) = typed.clone_link() {
        event = event.with_unique_key(resolver.clone_key_of(&link).await?);
    }

    let stored = log.append(event).await?;
    info!(event_type = %stored.event_type, seq = stored.seq, "Appended event");
    Ok(serde_json::to_value(stored)?)
}
