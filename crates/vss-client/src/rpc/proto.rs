//! `kuksa.val.v1` messages and client stub.
//!
//! Declared with prost/tonic derives so no protoc is needed at build time.
//! Only the fields this client reads or writes are declared; unknown fields
//! on the wire are skipped by the decoder.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    Unspecified = 0,
    String = 1,
    Boolean = 2,
    Int8 = 3,
    Int16 = 4,
    Int32 = 5,
    Int64 = 6,
    Uint8 = 7,
    Uint16 = 8,
    Uint32 = 9,
    Uint64 = 10,
    Float = 11,
    Double = 12,
    Timestamp = 13,
    StringArray = 20,
    BooleanArray = 21,
    Int8Array = 22,
    Int16Array = 23,
    Int32Array = 24,
    Int64Array = 25,
    Uint8Array = 26,
    Uint16Array = 27,
    Uint32Array = 28,
    Uint64Array = 29,
    FloatArray = 30,
    DoubleArray = 31,
    TimestampArray = 32,
}

impl DataType {
    /// VSS spelling, e.g. `uint8` or `float[]`
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Timestamp => "timestamp",
            Self::StringArray => "string[]",
            Self::BooleanArray => "boolean[]",
            Self::Int8Array => "int8[]",
            Self::Int16Array => "int16[]",
            Self::Int32Array => "int32[]",
            Self::Int64Array => "int64[]",
            Self::Uint8Array => "uint8[]",
            Self::Uint16Array => "uint16[]",
            Self::Uint32Array => "uint32[]",
            Self::Uint64Array => "uint64[]",
            Self::FloatArray => "float[]",
            Self::DoubleArray => "double[]",
            Self::TimestampArray => "timestamp[]",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EntryType {
    Unspecified = 0,
    Attribute = 1,
    Sensor = 2,
    Actuator = 3,
}

impl EntryType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Attribute => "attribute",
            Self::Sensor => "sensor",
            Self::Actuator => "actuator",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum View {
    Unspecified = 0,
    CurrentValue = 1,
    TargetValue = 2,
    Metadata = 3,
    Fields = 10,
    All = 20,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Field {
    Unspecified = 0,
    Path = 1,
    Value = 2,
    ActuatorTarget = 3,
    Metadata = 10,
    MetadataDataType = 11,
    MetadataDescription = 12,
    MetadataEntryType = 13,
    MetadataComment = 14,
    MetadataDeprecation = 15,
    MetadataUnit = 16,
    MetadataValueRestriction = 17,
    MetadataActuator = 20,
    MetadataSensor = 30,
    MetadataAttribute = 40,
}

// ---------------------------------------------------------------------------
// Data entries
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DataEntry {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<Datapoint>,
    #[prost(message, optional, tag = "3")]
    pub actuator_target: Option<Datapoint>,
    #[prost(message, optional, tag = "10")]
    pub metadata: Option<Metadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Datapoint {
    #[prost(
        oneof = "datapoint::Value",
        tags = "11, 12, 13, 14, 15, 16, 17, 18, 21, 22, 23, 24, 25, 26, 27, 28"
    )]
    pub value: Option<datapoint::Value>,
}

pub mod datapoint {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(string, tag = "11")]
        String(String),
        #[prost(bool, tag = "12")]
        Bool(bool),
        #[prost(sint32, tag = "13")]
        Int32(i32),
        #[prost(sint64, tag = "14")]
        Int64(i64),
        #[prost(uint32, tag = "15")]
        Uint32(u32),
        #[prost(uint64, tag = "16")]
        Uint64(u64),
        #[prost(float, tag = "17")]
        Float(f32),
        #[prost(double, tag = "18")]
        Double(f64),
        #[prost(message, tag = "21")]
        StringArray(super::StringArray),
        #[prost(message, tag = "22")]
        BoolArray(super::BoolArray),
        #[prost(message, tag = "23")]
        Int32Array(super::Int32Array),
        #[prost(message, tag = "24")]
        Int64Array(super::Int64Array),
        #[prost(message, tag = "25")]
        Uint32Array(super::Uint32Array),
        #[prost(message, tag = "26")]
        Uint64Array(super::Uint64Array),
        #[prost(message, tag = "27")]
        FloatArray(super::FloatArray),
        #[prost(message, tag = "28")]
        DoubleArray(super::DoubleArray),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StringArray {
    #[prost(string, repeated, tag = "1")]
    pub values: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BoolArray {
    #[prost(bool, repeated, tag = "1")]
    pub values: Vec<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int32Array {
    #[prost(sint32, repeated, tag = "1")]
    pub values: Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64Array {
    #[prost(sint64, repeated, tag = "1")]
    pub values: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Uint32Array {
    #[prost(uint32, repeated, tag = "1")]
    pub values: Vec<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Uint64Array {
    #[prost(uint64, repeated, tag = "1")]
    pub values: Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FloatArray {
    #[prost(float, repeated, tag = "1")]
    pub values: Vec<f32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DoubleArray {
    #[prost(double, repeated, tag = "1")]
    pub values: Vec<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(enumeration = "DataType", tag = "11")]
    pub data_type: i32,
    #[prost(enumeration = "EntryType", tag = "12")]
    pub entry_type: i32,
    #[prost(string, optional, tag = "13")]
    pub description: Option<String>,
    #[prost(string, optional, tag = "14")]
    pub comment: Option<String>,
    #[prost(string, optional, tag = "15")]
    pub deprecation: Option<String>,
    #[prost(string, optional, tag = "16")]
    pub unit: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Error {
    #[prost(uint32, tag = "1")]
    pub code: u32,
    #[prost(string, tag = "2")]
    pub reason: String,
    #[prost(string, tag = "3")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DataEntryError {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(message, optional, tag = "2")]
    pub error: Option<Error>,
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EntryRequest {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(enumeration = "View", tag = "2")]
    pub view: i32,
    #[prost(enumeration = "Field", repeated, tag = "3")]
    pub fields: Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRequest {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<EntryRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResponse {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<DataEntry>,
    #[prost(message, repeated, tag = "2")]
    pub errors: Vec<DataEntryError>,
    #[prost(message, optional, tag = "3")]
    pub error: Option<Error>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EntryUpdate {
    #[prost(message, optional, tag = "1")]
    pub entry: Option<DataEntry>,
    #[prost(enumeration = "Field", repeated, tag = "2")]
    pub fields: Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetRequest {
    #[prost(message, repeated, tag = "1")]
    pub updates: Vec<EntryUpdate>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<Error>,
    #[prost(message, repeated, tag = "2")]
    pub errors: Vec<DataEntryError>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeEntry {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(enumeration = "View", tag = "2")]
    pub view: i32,
    #[prost(enumeration = "Field", repeated, tag = "3")]
    pub fields: Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeRequest {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<SubscribeEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeResponse {
    #[prost(message, repeated, tag = "1")]
    pub updates: Vec<EntryUpdate>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetServerInfoRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetServerInfoResponse {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub version: String,
}

// ---------------------------------------------------------------------------
// Client stub
// ---------------------------------------------------------------------------

/// Client for the `kuksa.val.v1.VAL` service
#[derive(Debug, Clone)]
pub struct ValClient {
    inner: tonic::client::Grpc<Channel>,
}

impl ValClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn ready(&mut self) -> Result<(), tonic::Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {}", e)))
    }

    pub async fn get(
        &mut self,
        request: tonic::Request<GetRequest>,
    ) -> Result<tonic::Response<GetResponse>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static("/kuksa.val.v1.VAL/Get");
        self.inner.unary(request, path, codec).await
    }

    pub async fn set(
        &mut self,
        request: tonic::Request<SetRequest>,
    ) -> Result<tonic::Response<SetResponse>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static("/kuksa.val.v1.VAL/Set");
        self.inner.unary(request, path, codec).await
    }

    pub async fn subscribe(
        &mut self,
        request: tonic::Request<SubscribeRequest>,
    ) -> Result<tonic::Response<tonic::Streaming<SubscribeResponse>>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static("/kuksa.val.v1.VAL/Subscribe");
        self.inner.server_streaming(request, path, codec).await
    }

    pub async fn get_server_info(
        &mut self,
        request: tonic::Request<GetServerInfoRequest>,
    ) -> Result<tonic::Response<GetServerInfoResponse>, tonic::Status> {
        self.ready().await?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static("/kuksa.val.v1.VAL/GetServerInfo");
        self.inner.unary(request, path, codec).await
    }
}
