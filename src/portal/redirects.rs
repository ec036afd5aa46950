//! Redirect chain following.
//!
//! Portals usually bounce the browser through a few pages before the login
//! form, handing out session cookies on the way. The chain is walked with one
//! fresh GET per hop so those cookies end up in the store.

use log::{info, warn};

use crate::error_handling::{ParseError, ProbeError};
use crate::http::{HttpClient, Transport};
use crate::target::ServerTarget;

/// Targets requested while following a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectChain {
    /// Every hop requested, in order
    pub visited: Vec<ServerTarget>,
    /// `false` when the hop limit cut the chain short
    pub completed: bool,
}

/// Turns a `Location` value into a target.
///
/// `/path` reuses the previous target's scheme, host and port; `//host/path`
/// reuses only its scheme; anything else must be an absolute `http(s)` URL.
///
/// # Errors
///
/// Returns a [`ParseError`] for locations that are neither absolute nor
/// `/`-relative (e.g. `login.php`).
pub fn resolve_location(location: &str, previous: &ServerTarget) -> Result<ServerTarget, ParseError> {
    let location = location.trim();

    match LocationKind::of(location) {
        LocationKind::SchemeRelative => {
            let scheme = if previous.use_tls { "https" } else { "http" };
            ServerTarget::parse(&format!("{scheme}:{location}"))
        }
        LocationKind::PathRelative => Ok(previous.with_path(location)),
        LocationKind::Absolute => ServerTarget::parse(location),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationKind {
    /// `//host/path`: new server, same scheme
    SchemeRelative,
    /// `/path`: same server
    PathRelative,
    /// Everything else
    Absolute,
}

impl LocationKind {
    fn of(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("//") {
            LocationKind::SchemeRelative
        } else if location.starts_with('/') {
            LocationKind::PathRelative
        } else {
            LocationKind::Absolute
        }
    }
}

/// Follows `Location` headers starting from `initial_location`.
///
/// At most `max_redirects` requests are made. Running out of hops is not an
/// error: the chain is simply abandoned where it is, which keeps a redirect
/// loop from stalling the tick.
///
/// # Errors
///
/// Returns a [`ProbeError`] when a hop cannot be connected to or a location
/// cannot be resolved.
pub async fn follow_redirects<T: Transport>(
    client: &mut HttpClient<T>,
    initial_location: &str,
    context: &ServerTarget,
    max_redirects: usize,
) -> Result<RedirectChain, ProbeError> {
    let mut chain = RedirectChain::default();
    let mut location = initial_location.to_string();
    let mut previous = context.clone();

    for _ in 0..max_redirects {
        let target = resolve_location(&location, &previous)?;
        if LocationKind::of(&location) == LocationKind::PathRelative {
            info!("Following relative redirect to: {location}");
        } else {
            info!("Following redirect to '{location}' ({})", target.host);
        }

        let headers = client.get(&target).await?;
        chain.visited.push(target.clone());

        match headers.location() {
            Some(next) => {
                location = next.to_string();
                previous = target;
            }
            None => {
                info!("No more redirects...");
                chain.completed = true;
                return Ok(chain);
            }
        }
    }

    warn!(
        "Stopped following redirects after {} hops, next was '{}'",
        max_redirects, location
    );
    Ok(chain)
}
