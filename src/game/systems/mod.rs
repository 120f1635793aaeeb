pub mod cleanup;
pub mod collision;
pub mod damage;
pub mod motion;
