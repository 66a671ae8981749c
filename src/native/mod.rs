/// Native module contains implementations of core traits
/// without using any external dependencies like Docker or Runc:
/// plain child processes, scoped by working directory and process group.
pub mod runner;
