//! End-to-end compilation tests: source text in, VYPcode text out.

mod harness;

mod classes;
mod control_flow;
mod functions;
mod scenarios;
mod strings;
