//! Login submission.

use log::{debug, info};

use crate::config::LoginDestination;
use crate::error_handling::{ConnectError, ProbeError};
use crate::http::{HttpClient, Method, Request, Transport};
use crate::portal::redirects::follow_redirects;
use crate::target::ServerTarget;

/// Result of one login sub-flow, decided by re-probing the server afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The re-probe no longer hits the portal
    Succeeded,
    /// The re-probe still redirects to the portal, or the flow broke off
    Failed,
}

/// Fetches `source` only so that its `Set-Cookie` headers land in the store.
///
/// # Errors
///
/// Returns the [`ConnectError`] of the request.
pub async fn prime_cookies<T: Transport>(
    client: &mut HttpClient<T>,
    source: &ServerTarget,
) -> Result<(), ConnectError> {
    debug!("Fetching session cookies from {source}");
    client.get(source).await?;
    debug!(
        "{} cookie(s) stored for {}",
        client.cookies().len_for(&source.host),
        source.host
    );
    Ok(())
}

/// Sends the configured login and follows any redirect it answers with.
///
/// `POST` sends the data as a form body; `GET` appends it to the path as a
/// query string. Stored cookies for the login host are sent along.
///
/// # Errors
///
/// Returns a [`ProbeError`] if the login request or a redirect hop after it
/// fails.
pub async fn send_login<T: Transport>(
    client: &mut HttpClient<T>,
    destination: &LoginDestination,
    max_redirects: usize,
) -> Result<(), ProbeError> {
    let target = &destination.target;
    debug!("Will try to login to {}{}", target.host, target.path);

    let request = match destination.method {
        Method::Post => Request::post(target, &destination.data),
        Method::Get => Request::get_with_query(target, &destination.data),
    };

    let headers = client.send(target, &request).await?;
    info!("Login data sent...");

    if let Some(location) = headers.location() {
        follow_redirects(client, location, target, max_redirects).await?;
    }
    debug!("Got response: {:?}", headers.lines());

    Ok(())
}
