pub mod extractors;
pub mod programs;
pub mod users;

use crate::application::blueprint::Blueprint;
use crate::state::AppState;

/// Resource blueprints in registration order
pub fn blueprints(state: &AppState) -> Vec<Blueprint> {
    vec![
        programs::blueprint(state.clone()),
        users::blueprint(state.clone()),
    ]
}
