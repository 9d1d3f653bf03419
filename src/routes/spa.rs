// ABOUTME: Static hosting for the built single-page front end
// ABOUTME: Serves bundle files and answers unknown paths with index.html for client-side routing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Service serving `static_dir`, falling back to its `index.html`
pub fn spa_service(static_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(static_dir.join("index.html")))
}
