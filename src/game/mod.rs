pub mod constants;
pub mod events;
pub mod frame;
pub mod pool;
pub mod spatial;
pub mod state;
pub mod systems;
