// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod estimator;
pub mod models;
pub mod repository;
pub mod utils;
pub mod wizard;
