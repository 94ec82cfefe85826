//reference:https://github.com/frewsxcv/rgis/blob/main/rgis-network/src/lib.rs

use bevy::prelude::*;
use futures_util::StreamExt;
use mapplane_jobs::{FinishedJobs, Job};
use mapplane_scene::TileKey;
use std::io;

use super::{LoadCompletion, TileDataSource, TileRequest};
use crate::settings::MapPlaneSettings;

/// Upper bound for buffer space reserved from a `Content-Length` header.
const MAX_PREALLOCATION: u64 = 16 << 20;

fn preallocation(content_length: u64) -> usize {
    content_length.min(MAX_PREALLOCATION) as usize
}

/// Fetches tiles from a slippy-map server. The URL template may use `{z}`,
/// `{x}`, `{y}` and, when subdomains are configured, `{s}`.
#[derive(Clone, Debug)]
pub struct XyzDataSource {
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub maximum_level: u32,
}

impl Default for XyzDataSource {
    fn default() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            subdomains: vec![],
            maximum_level: 19,
        }
    }
}

impl XyzDataSource {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            ..Default::default()
        }
    }

    /// Deepest level this source serves in `world`: its own limit, lowered
    /// to [`MapPlaneSettings::maximum_level`] when that resource exists.
    pub fn effective_maximum_level(&self, world: &World) -> u32 {
        world
            .get_resource::<MapPlaneSettings>()
            .map_or(self.maximum_level, |settings| {
                self.maximum_level.min(settings.maximum_level)
            })
    }

    pub fn tile_url(&self, key: &TileKey) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &key.level.to_string())
            .replace("{x}", &key.x.to_string())
            .replace("{y}", &key.y.to_string());
        if !self.subdomains.is_empty() {
            let index = (u64::from(key.x) + u64::from(key.y)) % self.subdomains.len() as u64;
            if let Some(subdomain) = self.subdomains.get(index as usize) {
                url = url.replace("{s}", subdomain);
            }
        }
        url
    }
}

impl TileDataSource for XyzDataSource {
    fn name(&self) -> &str {
        "xyz"
    }

    fn request(&self, world: &mut World, request: TileRequest) {
        let maximum_level = self.effective_maximum_level(world);
        if request.key.level > maximum_level {
            bevy::log::warn!(
                "tile {} is deeper than the source's maximum level {}",
                request.key,
                maximum_level
            );
            return;
        }
        FetchTileJob {
            url: self.tile_url(&request.key),
            completion: request.completion,
        }
        .spawn_in_world(world);
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FetchTileError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),
}

pub struct FetchTileJob {
    pub url: String,
    pub completion: LoadCompletion,
}

pub struct FetchTileOutcome {
    pub url: String,
    pub completion: LoadCompletion,
    pub result: Result<bytes::Bytes, FetchTileError>,
}

impl Job for FetchTileJob {
    type Outcome = FetchTileOutcome;

    fn name(&self) -> String {
        format!("fetch tile {}", self.completion.key())
    }

    fn perform(self, ctx: mapplane_jobs::Context) -> mapplane_jobs::AsyncReturn<Self::Outcome> {
        Box::pin(async move {
            let url = self.url.clone();
            let fetch = async {
                let response = reqwest::get(url).await?.error_for_status()?;
                let total_size = response.content_length().unwrap_or(0);
                let mut bytes_stream = response.bytes_stream();
                let mut bytes = Vec::<u8>::with_capacity(preallocation(total_size));

                while let Some(bytes_chunk) = bytes_stream.next().await {
                    bytes.extend_from_slice(&bytes_chunk?);
                    if total_size > 0 {
                        let percent = (bytes.len() as u64 * 100 / total_size).min(100);
                        let _ = ctx.send_progress(percent as u8).await;
                    }
                }
                Ok::<_, FetchTileError>(bytes::Bytes::from(bytes))
            };
            #[cfg(not(target_arch = "wasm32"))]
            let result = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(fetch),
                Err(e) => Err(e.into()),
            };
            #[cfg(target_arch = "wasm32")]
            let result = fetch.await;

            FetchTileOutcome {
                url: self.url,
                completion: self.completion,
                result,
            }
        })
    }
}

/// Hands fetched bytes to the quadtree. Failed fetches drop their completion,
/// so the node stays loading and never shows.
pub fn handle_fetch_tile_jobs(mut finished_jobs: FinishedJobs) {
    while let Some(outcome) = finished_jobs.take_next::<FetchTileJob>() {
        match outcome.result {
            Ok(bytes) => {
                bevy::log::debug!("fetched {} ({} bytes)", outcome.url, bytes.len());
                outcome.completion.complete(Some(bytes));
            }
            Err(e) => {
                bevy::log::error!(
                    "Could not fetch tile {} from {}: {}",
                    outcome.completion.key(),
                    outcome.url,
                    e
                );
            }
        }
    }
}
