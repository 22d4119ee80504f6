#[derive(Clone)]
pub struct AppState {
    handle: WorldHandle,
}

impl AppState {
    pub fn new(handle: WorldHandle) -> Self {
        Self { handle }
    }
}
