pub mod draft;
pub mod trip;
