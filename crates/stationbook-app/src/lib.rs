// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod details;
pub mod directory;
pub mod forms;
pub mod ids;
pub mod model;
pub mod service;
pub mod state;

pub use details::*;
pub use directory::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use service::*;
pub use state::*;
