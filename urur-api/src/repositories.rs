use crate::endpoints::services::{CreateService, NewService};

pub struct ServiceRepository;

impl ServiceRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn create(&self, service: NewService) -> CreateService {
        CreateService::new(service)
    }
}
