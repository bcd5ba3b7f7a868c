mod cell_pos;
mod screen_point;
mod world_point;

pub use cell_pos::CellPos;
pub use screen_point::ScreenPoint;
pub use world_point::WorldPoint;
