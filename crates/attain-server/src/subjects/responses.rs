use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub deleted: usize,
}
