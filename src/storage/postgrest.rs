//! Hosted store client.
//!
//! [`PostgrestStore`] talks to a Supabase-style project: records through its PostgREST
//! endpoint (`/rest/v1`) and the session through its auth endpoint (`/auth/v1`). The
//! project's row-level security policies scope every request to the signed-in user,
//! so no user filter is sent with reads.
//!
//! Requests are blocking and issued one at a time. No timeout is configured beyond the
//! HTTP client's defaults. A request rejected with `401` is retried once after the
//! session has been renewed with its refresh token; the renewed session is written back
//! to the session file when one is attached.

use crate::domain::error::{MileyError, Result};
use crate::domain::SessionUser;
use crate::storage::backend::{Collection, RemoteStore};
use crate::storage::models::{
    FillupChanges, FillupRow, NewFillupRow, NewVehicleRow, VehicleRow,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

/// An authenticated session issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: SessionUser,
}

impl Session {
    /// Reads a session saved by [`Session::save`]. Returns `None` if there is no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the session to `path`, creating parent directories.
    ///
    /// The file holds bearer credentials; on unix it is readable by the owner only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;

        // `mode` only applies to newly created files.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(contents.as_bytes())?;
        tracing::debug!(path = ?path, "session saved");
        Ok(())
    }

    /// Removes a saved session. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn forget(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Error payloads returned by PostgREST (`message`) and the auth service
/// (`msg` or `error_description`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

/// Client for the hosted record store and auth service.
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    anon_key: String,
    session: RefCell<Option<Session>>,
    session_file: Option<PathBuf>,
}

impl PostgrestStore {
    /// Creates a client for the project at `base_url`.
    ///
    /// Pass the session persisted by a previous sign-in, or `None` and call
    /// [`sign_in_with_password`](Self::sign_in_with_password).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, anon_key: &str, session: Option<Session>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("miley/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RefCell::new(session),
            session_file: None,
        })
    }

    /// Saves renewed sessions to `path`.
    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// The current session, if signed in.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Signs in with email and password and keeps the issued session.
    ///
    /// # Errors
    ///
    /// Returns [`MileyError::Remote`] with the auth service's message when the
    /// credentials are rejected.
    pub fn sign_in_with_password(&mut self, email: &str, password: &str) -> Result<Session> {
        let _span = tracing::debug_span!("postgrest_sign_in", email = %email).entered();

        let request = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }));

        let session: Session = decode(request.send()?)?;
        tracing::info!(user_id = %session.user.id, "signed in");

        *self.session.get_mut() = Some(session.clone());
        Ok(session)
    }

    /// Exchanges the session's refresh token for a new session.
    ///
    /// The new session replaces the current one and is saved to the session file, if
    /// one is attached.
    ///
    /// # Errors
    ///
    /// Returns [`MileyError::Auth`] when there is no refresh token, or the auth
    /// service's error when the token is rejected.
    pub fn refresh_session(&self) -> Result<Session> {
        let _span = tracing::debug_span!("postgrest_refresh_session").entered();

        let refresh_token = self
            .session
            .borrow()
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or_else(|| MileyError::Auth("session expired".to_string()))?;

        let request = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }));

        let session: Session = decode(request.send()?)?;
        if let Some(path) = &self.session_file {
            session.save(path)?;
        }
        tracing::info!(user_id = %session.user.id, "session refreshed");

        *self.session.borrow_mut() = Some(session.clone());
        Ok(session)
    }

    /// URL of a collection's REST endpoint.
    fn rest_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table())
    }

    /// Adds the project key and the session's bearer token.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or_else(|| MileyError::Auth("not signed in".to_string()))?;

        Ok(request.header("apikey", &self.anon_key).bearer_auth(token))
    }

    /// Sends an authorized request, renewing the session and retrying once on `401`.
    fn execute(&self, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let response = self.authorized(build())?.send()?;
        if response.status() != StatusCode::UNAUTHORIZED || !self.can_refresh() {
            return Ok(response);
        }

        tracing::info!("access token rejected, refreshing session");
        self.refresh_session()?;
        Ok(self.authorized(build())?.send()?)
    }

    fn can_refresh(&self) -> bool {
        self.session
            .borrow()
            .as_ref()
            .is_some_and(|s| s.refresh_token.is_some())
    }

    fn list<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let url = self.rest_url(collection);
        let order = format!("{}.asc", collection.order_column());

        let rows: Vec<T> = decode(self.execute(|| {
            self.client
                .get(&url)
                .query(&[("select", "*"), ("order", order.as_str())])
        })?)?;
        tracing::debug!(collection = %collection, count = rows.len(), "rows fetched");
        Ok(rows)
    }

    fn insert<B, T>(&self, collection: Collection, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.rest_url(collection);

        let rows: Vec<T> = decode(self.execute(|| {
            self.client
                .post(&url)
                .header("Prefer", "return=representation")
                .json(&[body])
        })?)?;
        rows.into_iter().next().ok_or_else(|| MileyError::Remote {
            status: 200,
            message: format!("insert into {collection} returned no row"),
        })
    }

    fn delete_where(&self, collection: Collection, column: &str, value: &str) -> Result<()> {
        let url = self.rest_url(collection);
        let filter = format!("eq.{value}");

        check(self.execute(|| {
            self.client
                .delete(&url)
                .query(&[(column, filter.as_str())])
        })?)
    }
}

/// Decodes a JSON response body, or the service's error for a failed response.
fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(remote_error(status.as_u16(), &body));
    }

    Ok(response.json()?)
}

/// Checks a response whose success body carries nothing of interest.
fn check(response: Response) -> Result<()> {
    let status = response.status();

    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().unwrap_or_default();
        Err(remote_error(status.as_u16(), &body))
    }
}

/// Builds a remote error from a failed response, keeping the service's own message.
fn remote_error(status: u16, body: &str) -> MileyError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.msg).or(b.error_description))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("request failed with status {status}")
            } else {
                trimmed.to_string()
            }
        });

    tracing::warn!(status, message = %message, "store request failed");
    MileyError::Remote { status, message }
}

impl RemoteStore for PostgrestStore {
    fn current_user(&self) -> Result<SessionUser> {
        let _span = tracing::debug_span!("postgrest_current_user").entered();
        let url = format!("{}/auth/v1/user", self.base_url);
        decode(self.execute(|| self.client.get(&url))?)
    }

    fn list_vehicles(&self) -> Result<Vec<VehicleRow>> {
        let _span = tracing::debug_span!("postgrest_list_vehicles").entered();
        self.list(Collection::Vehicles)
    }

    fn list_fillups(&self) -> Result<Vec<FillupRow>> {
        let _span = tracing::debug_span!("postgrest_list_fillups").entered();
        self.list(Collection::Fillups)
    }

    fn insert_vehicle(&mut self, row: &NewVehicleRow) -> Result<VehicleRow> {
        let _span = tracing::debug_span!("postgrest_insert_vehicle", name = %row.name).entered();
        self.insert(Collection::Vehicles, row)
    }

    fn insert_fillup(&mut self, row: &NewFillupRow) -> Result<FillupRow> {
        let _span = tracing::debug_span!(
            "postgrest_insert_fillup",
            vehicle_id = %row.motorcycle_id,
            odometer = row.odometer
        )
        .entered();
        self.insert(Collection::Fillups, row)
    }

    fn update_fillup(&mut self, id: &str, changes: &FillupChanges) -> Result<FillupRow> {
        let _span = tracing::debug_span!("postgrest_update_fillup", id = %id).entered();

        let url = self.rest_url(Collection::Fillups);
        let filter = format!("eq.{id}");

        let rows: Vec<FillupRow> = decode(self.execute(|| {
            self.client
                .patch(&url)
                .query(&[("id", filter.as_str())])
                .header("Prefer", "return=representation")
                .json(changes)
        })?)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| MileyError::NotFound(format!("fillup {id}")))
    }

    fn delete_fillups_for_vehicle(&mut self, vehicle_id: &str) -> Result<()> {
        let _span =
            tracing::debug_span!("postgrest_delete_fillups_for_vehicle", vehicle_id = %vehicle_id)
                .entered();
        self.delete_where(Collection::Fillups, "motorcycle_id", vehicle_id)
    }

    fn delete_vehicle(&mut self, id: &str) -> Result<()> {
        let _span = tracing::debug_span!("postgrest_delete_vehicle", id = %id).entered();
        self.delete_where(Collection::Vehicles, "id", id)
    }

    fn delete_fillup(&mut self, id: &str) -> Result<()> {
        let _span = tracing::debug_span!("postgrest_delete_fillup", id = %id).entered();
        self.delete_where(Collection::Fillups, "id", id)
    }

    fn sign_out(&mut self) -> Result<()> {
        let _span = tracing::debug_span!("postgrest_sign_out").entered();

        let url = format!("{}/auth/v1/logout", self.base_url);
        check(self.execute(|| self.client.post(&url))?)?;

        *self.session.get_mut() = None;
        tracing::info!("signed out");
        Ok(())
    }
}
