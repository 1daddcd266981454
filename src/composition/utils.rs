pub mod key_generator;
