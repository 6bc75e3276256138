//! Staleness checks.
//!
//! A token is only as good as the actor state it was cut from. After a
//! tenant switch (or any role/membership change) the old token must stop
//! working so decisions never run against a pre-switch snapshot.

use anyhow::Result;
use dog_tenancy::{bail_access, AccessError, Actor, ActorId};
use tracing::warn;

use crate::claims::SessionClaims;
use crate::jwt::SessionIssuer;
use crate::store::ActorStore;

pub const STALE_SESSION: &str = "Session is out of date; reissue the token";

/// `NotAuthenticated` unless the claims mirror the persisted actor.
pub fn ensure_fresh(claims: &SessionClaims, persisted: &Actor) -> Result<(), AccessError> {
    if claims.matches(persisted) {
        return Ok(());
    }
    warn!("Rejected stale session {} for {}", claims.jti, claims.sub);
    Err(AccessError::not_authenticated(STALE_SESSION))
}

/// Verify `token` and load the actor decisions should run against.
///
/// The returned actor is always the persisted one, never the token's copy.
pub async fn authenticate<S>(issuer: &SessionIssuer, store: &S, token: &str) -> Result<Actor>
where
    S: ActorStore + ?Sized,
{
    let claims = issuer.verify(token)?;

    let Some(persisted) = store.get(&ActorId::new(claims.sub.clone())).await? else {
        bail_access!(not_authenticated, "Unknown session subject '{}'", claims.sub);
    };

    if issuer.options().check_freshness {
        ensure_fresh(&claims, &persisted).map_err(AccessError::into_anyhow)?;
    }

    Ok(persisted)
}
