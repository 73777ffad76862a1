//! Configuration
//!
//! Settings are read once at startup from flags and environment variables.
//!
//! ## Environment
//!
//! ```text
//! OPENAPI_SOURCES=https://api.test/openapi.json,./internal.json
//! COLLECTION_FILE=./collection.json
//! COLLECTION_URL=                 # overrides COLLECTION_FILE when set
//! ENVIRONMENT_FILE=./env.json
//! ENVIRONMENT_URL=                # overrides ENVIRONMENT_FILE when set
//! PORT=8080
//! METRICS_URL_PATH=/metrics
//! STATUS_ENABLED=true
//! REFRESH_INTERVAL=120
//! RUN_INTERVAL=30
//! RUN_ITERATIONS=1
//! ENABLE_BAIL=false
//! ENABLE_REQUEST_METRICS=true
//! POSTMAN_token=secret            # becomes run variable `token`
//! ```

mod settings;

pub use settings::{RUN_VARIABLE_PREFIX, RunVariables, Settings, SettingsError};
