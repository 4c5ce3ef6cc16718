//! Pluggable GraphQL serialization
//!
//! Like XML, the GraphQL grammar is owned by the caller. A [`GraphQlBody`]
//! hands the object, its variables and the [`GraphQlQueryType`] to a
//! [`GraphQlEncoder`].

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::body::Body;
use crate::content_type::ContentType;
use crate::error::BodyEncodeError;

/// GraphQL variables, passed through to the encoder
pub type Variables = BTreeMap<String, String>;

/// The kind of GraphQL operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GraphQlQueryType {
    #[default]
    Query,
    Mutation,
}

impl GraphQlQueryType {
    /// Get the operation keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphQlQueryType::Query => "query",
            GraphQlQueryType::Mutation => "mutation",
        }
    }
}

/// GraphQL encoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphQlEncodeError {
    #[error("unable to encode object as GraphQL")]
    EncodeError,
}

/// GraphQL decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphQlDecodeError {
    #[error("unable to decode GraphQL data")]
    DecodeError,
}

/// Serializes objects as GraphQL
pub trait GraphQlEncoder {
    /// The object this encoder serializes
    type Object;

    /// Serialize the object with its variables for the given operation kind
    fn encode(
        &self,
        object: &Self::Object,
        variables: &Variables,
        query_type: GraphQlQueryType,
    ) -> Result<Vec<u8>, GraphQlEncodeError>;

    /// Serialize as a query without variables
    fn encode_query(&self, object: &Self::Object) -> Result<Vec<u8>, GraphQlEncodeError> {
        self.encode_with_variables(object, &Variables::new())
    }

    /// Serialize as a query with variables
    fn encode_with_variables(
        &self,
        object: &Self::Object,
        variables: &Variables,
    ) -> Result<Vec<u8>, GraphQlEncodeError> {
        self.encode(object, variables, GraphQlQueryType::Query)
    }
}

/// Deserializes GraphQL responses into objects
pub trait GraphQlDecoder {
    type Object;

    fn decode(&self, data: &[u8]) -> Result<Self::Object, GraphQlDecodeError>;
}

/// A GraphQL encoder backed by a closure
pub struct GraphQlInlineEncoder<T, F> {
    encode: F,
    _object: PhantomData<fn(&T)>,
}

impl<T, F> GraphQlInlineEncoder<T, F>
where
    F: Fn(&T, &Variables, GraphQlQueryType) -> Option<Vec<u8>>,
{
    pub fn new(encode: F) -> Self {
        Self {
            encode,
            _object: PhantomData,
        }
    }
}

impl<T, F> GraphQlEncoder for GraphQlInlineEncoder<T, F>
where
    F: Fn(&T, &Variables, GraphQlQueryType) -> Option<Vec<u8>>,
{
    type Object = T;

    fn encode(
        &self,
        object: &T,
        variables: &Variables,
        query_type: GraphQlQueryType,
    ) -> Result<Vec<u8>, GraphQlEncodeError> {
        (self.encode)(object, variables, query_type).ok_or(GraphQlEncodeError::EncodeError)
    }
}

impl<T, F> fmt::Debug for GraphQlInlineEncoder<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQlInlineEncoder").finish_non_exhaustive()
    }
}

/// A GraphQL decoder backed by a closure
pub struct GraphQlInlineDecoder<T, F> {
    decode: F,
    _object: PhantomData<fn() -> T>,
}

impl<T, F> GraphQlInlineDecoder<T, F>
where
    F: Fn(&[u8]) -> Option<T>,
{
    pub fn new(decode: F) -> Self {
        Self {
            decode,
            _object: PhantomData,
        }
    }
}

impl<T, F> GraphQlDecoder for GraphQlInlineDecoder<T, F>
where
    F: Fn(&[u8]) -> Option<T>,
{
    type Object = T;

    fn decode(&self, data: &[u8]) -> Result<T, GraphQlDecodeError> {
        (self.decode)(data).ok_or(GraphQlDecodeError::DecodeError)
    }
}

impl<T, F> fmt::Debug for GraphQlInlineDecoder<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQlInlineDecoder").finish_non_exhaustive()
    }
}

/// A GraphQL decoder for JSON responses
#[derive(Debug, Clone, Copy)]
pub struct GraphQlJsonDecoder<T> {
    _object: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> GraphQlJsonDecoder<T> {
    pub fn new() -> Self {
        Self { _object: PhantomData }
    }
}

impl<T: DeserializeOwned> Default for GraphQlJsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> GraphQlDecoder for GraphQlJsonDecoder<T> {
    type Object = T;

    fn decode(&self, data: &[u8]) -> Result<T, GraphQlDecodeError> {
        serde_json::from_slice(data).map_err(|e| {
            tracing::debug!(error = %e, "GraphQL JSON decoding failed");
            GraphQlDecodeError::DecodeError
        })
    }
}

/// An object serialized as GraphQL by an injected encoder
pub struct GraphQlBody<E: GraphQlEncoder> {
    object: E::Object,
    query_type: GraphQlQueryType,
    variables: Variables,
    encoder: E,
}

impl<E: GraphQlEncoder> GraphQlBody<E> {
    /// Create a GraphQL body without variables
    pub fn new(object: E::Object, query_type: GraphQlQueryType, encoder: E) -> Self {
        Self::with_variables(object, query_type, Variables::new(), encoder)
    }

    /// Create a GraphQL body with variables
    pub fn with_variables(
        object: E::Object,
        query_type: GraphQlQueryType,
        variables: Variables,
        encoder: E,
    ) -> Self {
        Self {
            object,
            query_type,
            variables,
            encoder,
        }
    }

    pub fn query_type(&self) -> GraphQlQueryType {
        self.query_type
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }
}

impl<E: GraphQlEncoder> Body for GraphQlBody<E> {
    fn content_type(&self) -> ContentType {
        ContentType::GraphQl
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        self.encoder
            .encode(&self.object, &self.variables, self.query_type)
            .map_err(|_| self.encode_error())
    }
}
