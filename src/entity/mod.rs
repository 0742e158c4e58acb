pub mod admins;
pub mod classifiers;
pub mod datarows;
pub mod datasets;
pub mod devices;
pub mod labels;
pub mod languages;
pub mod projects;
pub mod sensors;
pub mod sessions;
pub mod users;
