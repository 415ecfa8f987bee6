// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! SafeTensors helpers for `F32` tensors with string metadata.
//!
//! Shared by the state loader, the output sink and the reference model
//! backend so that every file in a forecast run uses one encoding.

use crate::IrError;
use safetensors::{Dtype, SafeTensors};
use std::collections::HashMap;
use std::path::Path;
use tensor_core::{Shape, Tensor};

/// Memory-maps `path` read-only.
pub fn map_file(path: &Path) -> Result<memmap2::Mmap, IrError> {
    let file = std::fs::File::open(path)?;
    // SAFETY: the mapping is read-only; input and weight files are not
    // rewritten while a run holds them.
    let mmap = unsafe { memmap2::Mmap::map(&file) }?;
    Ok(mmap)
}

/// Parses the SafeTensors header of `bytes`.
pub fn parse(bytes: &[u8]) -> Result<SafeTensors<'_>, IrError> {
    SafeTensors::deserialize(bytes)
        .map_err(|e| IrError::SafeTensors(format!("SafeTensors parse error: {e}")))
}

/// Returns the `__metadata__` map, empty if the file has none.
pub fn read_metadata(bytes: &[u8]) -> Result<HashMap<String, String>, IrError> {
    let (_, metadata) = SafeTensors::read_metadata(bytes)
        .map_err(|e| IrError::SafeTensors(format!("cannot read header: {e}")))?;
    Ok(metadata.metadata().clone().unwrap_or_default())
}

/// Copies the named `F32` tensor out of a parsed file.
pub fn read_f32(tensors: &SafeTensors<'_>, name: &str) -> Result<Tensor, IrError> {
    let view = tensors
        .tensor(name)
        .map_err(|e| IrError::SafeTensors(format!("tensor '{name}' not found: {e}")))?;
    if view.dtype() != Dtype::F32 {
        return Err(IrError::SafeTensors(format!(
            "tensor '{name}' has dtype {:?}, expected F32",
            view.dtype()
        )));
    }
    Ok(Tensor::from_le_bytes(
        Shape::new(view.shape().to_vec()),
        view.data(),
    )?)
}

/// Returns `true` if the parsed file contains `name`.
pub fn contains(tensors: &SafeTensors<'_>, name: &str) -> bool {
    tensors.names().iter().any(|n| n.as_str() == name)
}

/// Writes `F32` tensors plus metadata to `path`, replacing any existing file.
pub fn write_f32(
    path: &Path,
    tensors: &[(&str, &Tensor)],
    metadata: HashMap<String, String>,
) -> Result<(), IrError> {
    let encoded: Vec<(&str, Vec<usize>, Vec<u8>)> = tensors
        .iter()
        .map(|(name, t)| (*name, t.dims().to_vec(), t.to_le_bytes()))
        .collect();

    let views = encoded
        .iter()
        .map(|(name, shape, bytes)| {
            safetensors::tensor::TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (name.to_string(), view))
                .map_err(|e| IrError::SafeTensors(format!("cannot encode '{name}': {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let metadata = if metadata.is_empty() {
        None
    } else {
        Some(metadata)
    };
    safetensors::serialize_to_file(views, &metadata, path)
        .map_err(|e| IrError::SafeTensors(format!("cannot write '{}': {e}", path.display())))
}
