//! Record store access for mgnrega-api

pub mod districts;
