#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ctf_progress_tracker::{HtmlFetcher, TrackerConfig, TrackerError};

pub const BASE_URL: &str = "https://ctftime.test";
pub const TEAM_ID: &str = "1000";

pub fn config() -> TrackerConfig {
    TrackerConfig::new(TEAM_ID, "Test Team").with_base_url(BASE_URL)
}

pub fn team_url() -> String {
    format!("{BASE_URL}/team/{TEAM_ID}")
}

pub fn event_url(id: u32) -> String {
    format!("{BASE_URL}/event/{id}")
}

/// Canned replies per URL; anything unlisted is a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, Duration)>>,
}

enum Reply {
    Body(String),
    Timeout,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Reply::Body(body.into()));
        self
    }

    pub fn timeout(mut self, url: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Reply::Timeout);
        self
    }

    pub fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|(url, _)| url).collect()
    }
}

#[async_trait]
impl HtmlFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, TrackerError> {
        self.calls.lock().unwrap().push((url.to_string(), timeout));
        match self.pages.get(url) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Timeout) => Err(TrackerError::Timeout { url: url.to_string() }),
            None => Err(TrackerError::HttpStatus { status: 404, url: url.to_string() }),
        }
    }
}

/// One participation row: place, event link (if any), CTF points, rating points.
pub fn row(place: &str, event: Option<(u32, &str)>, ctf: &str, rating: &str) -> String {
    let cell = match event {
        Some((id, name)) => format!(r#"<a href="/event/{id}">{name}</a>"#),
        None => String::new(),
    };
    format!(r#"<tr><td class="place_ico"></td><td class="place">{place}</td><td>{cell}</td><td>{ctf}</td><td>{rating}</td></tr>"#)
}

/// A team profile page with one tab per `(year, rows)` in the given order.
pub fn profile_page(years: &[(&str, Vec<String>)]) -> String {
    let mut links = String::new();
    let mut panes = String::new();
    for (year, rows) in years {
        links.push_str(&format!(r##"<li><a href="#rating_{year}" data-toggle="tab">{year}</a></li>"##));
        panes.push_str(&format!(
            r#"<div class="tab-pane" id="rating_{year}">
                 <p>Overall rating place: <b>100</b> with 10.000 pts in {year}</p>
                 <table class="table table-striped">
                   <tr><th></th><th>Place</th><th>Event</th><th>CTF points</th><th>Rating points</th></tr>
                   {rows}
                 </table>
               </div>"#,
            rows = rows.join("\n")
        ));
    }
    format!(
        r#"<html><body>
             <h3>Members</h3>
             <h3>Participated in CTF events</h3>
             <ul class="nav nav-tabs">{links}</ul>
             <div class="tab-content">{panes}</div>
           </body></html>"#
    )
}

pub fn event_page(total: u32) -> String {
    format!(
        r#"<html><body><div class="container">
             <h2>Some CTF</h2>
             <h3>Scoreboard</h3>
             <p align="right">{total} teams total</p>
             <table class="table table-striped"></table>
           </div></body></html>"#
    )
}
