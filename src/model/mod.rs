pub mod case;
pub mod element;
pub mod status;
pub mod suite;
