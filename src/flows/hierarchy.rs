//! Read-only view of the church hierarchy.

use reqwest::Method;
use tracing::{info, warn};

use crate::client::{path_segment, ApiClient, ApiResponse, Auth, Body};
use crate::error::ClientResult;
use crate::models::{HierarchyLevel, HierarchyResponse};

use super::{guard, Guarded};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyOutcome {
    NotLoggedIn,
    Loaded { message: Option<String> },
    Rejected { status: u16, detail: Option<String> },
}

pub struct HierarchyView {
    client: ApiClient,
    levels: Vec<HierarchyLevel>,
    server_message: Option<String>,
}

impl HierarchyView {
    pub fn new(client: ApiClient) -> Self { Self { client, levels: Vec::new(), server_message: None } }

    /// Everything the last fetch returned, inactive levels included.
    pub fn levels(&self) -> &[HierarchyLevel] { &self.levels }

    pub fn visible(&self) -> Vec<&HierarchyLevel> { self.levels.iter().filter(|l| l.is_active).collect() }

    /// Display names, active levels only, in server order.
    pub fn rendered(&self) -> Vec<String> {
        self.visible().into_iter().map(|l| l.display_name().to_string()).collect()
    }

    pub fn server_message(&self) -> Option<&str> { self.server_message.as_deref() }

    /// `GET /hierarchy`.
    pub async fn fetch_hierarchy(&mut self) -> ClientResult<HierarchyOutcome> {
        self.fetch("hierarchy".to_string()).await
    }

    /// `GET /hierarchy/{code}`: replaces the list with the single matching level.
    pub async fn fetch_level(&mut self, code: &str) -> ClientResult<HierarchyOutcome> {
        self.fetch(format!("hierarchy/{}", path_segment(code.trim()))).await
    }

    async fn fetch(&mut self, path: String) -> ClientResult<HierarchyOutcome> {
        let sent = self.client.send(Method::GET, &path, Body::Empty, Auth::Bearer).await;
        let resp = match guard("fetch hierarchy", sent)? {
            Guarded::Ran(r) => r,
            Guarded::NotLoggedIn => return Ok(HierarchyOutcome::NotLoggedIn),
        };
        if !resp.is_success() { return Ok(self.reject(&resp)); }
        let body: HierarchyResponse = resp.parse()?;
        info!(target: "churchman::flow", levels = body.data.len(), "hierarchy loaded");
        self.levels = body.data;
        self.server_message = body.message.clone();
        Ok(HierarchyOutcome::Loaded { message: body.message })
    }

    fn reject(&mut self, resp: &ApiResponse) -> HierarchyOutcome {
        let detail = resp.detail();
        warn!(target: "churchman::flow", status = resp.status, "hierarchy fetch rejected: {}", detail.as_deref().unwrap_or("<no detail>"));
        self.levels.clear();
        self.server_message = detail.clone();
        HierarchyOutcome::Rejected { status: resp.status, detail }
    }
}
