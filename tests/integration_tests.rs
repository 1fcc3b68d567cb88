//! Integration tests for graphmap

mod integration;
