pub mod spring;
