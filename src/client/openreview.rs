//! Authenticated client for the OpenReview API v2.
//!
//! All queries are read-only. Pagination is a plain offset/limit loop;
//! there are no retries, and every request shares one timeout-configured
//! `reqwest::Client`.

use crate::models::{Group, Note, Profile};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Notes fetched per pagination request.
const PAGE_SIZE: usize = 1000;

/// Errors from the OpenReview client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to OpenReview at {0}")]
    Connect(String),

    #[error("OpenReview API error {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// No known submission invitation resolved for the venue. Fatal:
    /// the venue id is wrong or the venue uses an unknown template.
    #[error("Could not find a submission invitation for venue '{0}'")]
    VenueConfig(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A filter for a paginated `/notes` query.
///
/// Exactly one of the constructors is used per call; the API treats the
/// filters as conjunctive but the pipelines never combine them.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    content_field: Option<(String, String)>,
    invitation: Option<String>,
    forum: Option<String>,
}

impl NoteQuery {
    /// Filter by content-field equality, e.g. `content.venueid=...`.
    pub fn by_content(field: &str, value: &str) -> Self {
        Self {
            content_field: Some((field.to_string(), value.to_string())),
            ..Default::default()
        }
    }

    /// Filter by invitation name.
    pub fn by_invitation(invitation: &str) -> Self {
        Self {
            invitation: Some(invitation.to_string()),
            ..Default::default()
        }
    }

    /// Filter by forum (thread) id.
    pub fn by_forum(forum: &str) -> Self {
        Self {
            forum: Some(forum.to_string()),
            ..Default::default()
        }
    }

    /// Render the filter as query parameters.
    fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some((field, value)) = &self.content_field {
            params.push((format!("content.{}", field), value.clone()));
        }
        if let Some(invitation) = &self.invitation {
            params.push(("invitation".to_string(), invitation.clone()));
        }
        if let Some(forum) = &self.forum {
            params.push(("forum".to_string(), forum.clone()));
        }
        params
    }
}

/// Submission invitations probed for a venue, in priority order.
pub fn submission_invitation_candidates(venue_id: &str) -> Vec<String> {
    vec![
        format!("{}/-/-/Blind_Submission", venue_id),
        format!("{}/-/-/Blind_Submission2", venue_id),
        format!("{}/-/-/Submission", venue_id),
        format!("{}/-/-/Paper", venue_id),
        format!("{}/-/Submission", venue_id),
        format!("{}/-/Blind_Submission", venue_id),
    ]
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    id: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct NotesResponse {
    #[serde(default)]
    notes: Vec<Note>,
}

#[derive(Deserialize)]
struct GroupsResponse {
    #[serde(default)]
    groups: Vec<Group>,
}

#[derive(Deserialize)]
struct InvitationsResponse {
    #[serde(default)]
    invitations: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct ProfileSearchRequest<'a> {
    ids: &'a [String],
}

#[derive(Deserialize)]
struct ProfileSearchResponse {
    #[serde(default)]
    profiles: Vec<Profile>,
}

/// Authenticated OpenReview API client.
pub struct OpenReviewClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    timeout_seconds: u64,
}

impl OpenReviewClient {
    /// Log in and return an authenticated client.
    pub async fn connect(
        base_url: &str,
        username: &str,
        password: &str,
        timeout_seconds: u64,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        info!("Logging in to {} as {}", base_url, username);

        let url = format!("{}/login", base_url);
        let response = http
            .post(&url)
            .json(&LoginRequest {
                id: username,
                password,
            })
            .send()
            .await
            .map_err(|e| map_send_error(e, &base_url, timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        let login: LoginResponse = response.json().await?;

        Ok(Self {
            http,
            base_url,
            token: login.token,
            timeout_seconds,
        })
    }

    /// Fetch every note matching the query, following pagination.
    pub async fn get_all_notes(&self, query: &NoteQuery) -> Result<Vec<Note>, ClientError> {
        let mut notes = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut params = query.params();
            params.push(("limit".to_string(), PAGE_SIZE.to_string()));
            params.push(("offset".to_string(), offset.to_string()));

            let page: NotesResponse = self.get("/notes", &params).await?;
            let fetched = page.notes.len();
            debug!("Fetched {} notes at offset {}", fetched, offset);

            notes.extend(page.notes);
            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(notes)
    }

    /// Fetch a group by id. A missing group surfaces as an API error the
    /// caller may absorb (group skips are non-fatal).
    pub async fn get_group(&self, group_id: &str) -> Result<Group, ClientError> {
        let params = vec![("id".to_string(), group_id.to_string())];
        let response: GroupsResponse = self.get("/groups", &params).await?;

        response
            .groups
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Api {
                status: StatusCode::NOT_FOUND,
                body: format!("Group not found: {}", group_id),
            })
    }

    /// Whether an invitation with this id exists.
    ///
    /// API-level failures (unknown id, forbidden) count as a miss; only
    /// transport errors propagate.
    pub async fn invitation_exists(&self, invitation_id: &str) -> Result<bool, ClientError> {
        let params = vec![("id".to_string(), invitation_id.to_string())];
        match self
            .get::<InvitationsResponse>("/invitations", &params)
            .await
        {
            Ok(response) => Ok(!response.invitations.is_empty()),
            Err(ClientError::Api { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Probe for the venue's submission invitation.
    ///
    /// Configured overrides are tried before the built-in candidates. No hit
    /// at all is a venue-configuration error and aborts the run.
    pub async fn find_submission_invitation(
        &self,
        venue_id: &str,
        overrides: &[String],
    ) -> Result<String, ClientError> {
        let mut candidates = overrides.to_vec();
        candidates.extend(submission_invitation_candidates(venue_id));

        for candidate in candidates {
            debug!("Probing submission invitation: {}", candidate);
            if self.invitation_exists(&candidate).await? {
                info!("Using submission invitation: {}", candidate);
                return Ok(candidate);
            }
        }

        Err(ClientError::VenueConfig(venue_id.to_string()))
    }

    /// Resolve a batch of member references to profiles.
    pub async fn search_profiles(&self, ids: &[String]) -> Result<Vec<Profile>, ClientError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/profiles/search", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&ProfileSearchRequest { ids })
            .send()
            .await
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        let search: ProfileSearchResponse = response.json().await?;
        Ok(search.profiles)
    }

    /// Perform a GET request and deserialize the JSON body.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

/// Translate transport failures into actionable errors.
fn map_send_error(e: reqwest::Error, base_url: &str, timeout_seconds: u64) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(timeout_seconds)
    } else if e.is_connect() {
        ClientError::Connect(base_url.to_string())
    } else {
        ClientError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_query_params() {
        let by_content = NoteQuery::by_content("venueid", "NeurIPS.cc/2025/Workshop/SEA");
        assert_eq!(
            by_content.params(),
            vec![(
                "content.venueid".to_string(),
                "NeurIPS.cc/2025/Workshop/SEA".to_string()
            )]
        );

        let by_forum = NoteQuery::by_forum("abc123");
        assert_eq!(
            by_forum.params(),
            vec![("forum".to_string(), "abc123".to_string())]
        );

        let by_invitation = NoteQuery::by_invitation("V/-/Submission");
        assert_eq!(
            by_invitation.params(),
            vec![("invitation".to_string(), "V/-/Submission".to_string())]
        );
    }

    #[test]
    fn test_submission_invitation_candidates_order() {
        let candidates = submission_invitation_candidates("V");
        assert_eq!(
            candidates,
            vec![
                "V/-/-/Blind_Submission",
                "V/-/-/Blind_Submission2",
                "V/-/-/Submission",
                "V/-/-/Paper",
                "V/-/Submission",
                "V/-/Blind_Submission",
            ]
        );
    }

    #[test]
    fn test_notes_response_deserialization() {
        let body = r#"{
            "notes": [
                {"id": "n1", "forum": "n1", "number": 3, "invitations": ["V/-/Submission"],
                 "cdate": 100, "content": {"title": {"value": "T"}}}
            ],
            "count": 1
        }"#;
        let response: NotesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.notes.len(), 1);
        assert_eq!(response.notes[0].paper_number(), 3);
        assert_eq!(response.notes[0].title(), "T");
    }

    #[test]
    fn test_venue_config_error_message() {
        let err = ClientError::VenueConfig("V".to_string());
        assert_eq!(
            err.to_string(),
            "Could not find a submission invitation for venue 'V'"
        );
    }
}
