//! Provider data structure passed to data sources

use crate::api::Client;

#[derive(Clone)]
pub struct ChuckNorrisProviderData {
    pub client: Client,
}

impl ChuckNorrisProviderData {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}
