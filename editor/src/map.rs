pub mod adt;
