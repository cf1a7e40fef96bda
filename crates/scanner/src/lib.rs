pub mod nfo;
pub mod walk;
