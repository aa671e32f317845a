pub mod fuser;
pub mod grad_mode;
pub mod guard;
