// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod quote;
pub mod apply;
pub mod loans;
pub mod users;
pub mod dashboard;
pub mod admin;
pub mod exporter;
pub mod settings;
