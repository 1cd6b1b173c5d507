//! Station configs and canned vendor payloads.

use crate::model::StationType;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub fn davis_config() -> Value {
    json!({
        "station_id": "d1",
        "install_date": "2023-05-01",
        "tz": "CT",
        "sn": "12345",
        "apikey": "test-key",
        "apisec": "test-secret"
    })
}

pub fn onset_config() -> Value {
    json!({
        "station_id": "o1",
        "install_date": "2023-05-01",
        "tz": "ET",
        "sn": "21092695",
        "client_id": "client-1",
        "client_secret": "client-secret",
        "ret_form": "JSON",
        "user_id": "user-1",
        "sensor_sn": {
            "atemp": "21079936-1",
            "pcpn": "21085496-1",
            "relh": "21079936-2"
        }
    })
}

pub fn rainwise_config() -> Value {
    json!({
        "sid": "S",
        "pid": "P",
        "mac": "M",
        "ret_form": "json",
        "tz": "ET",
        "station_id": "r1",
        "install_date": "2023-05-01"
    })
}

pub fn spectrum_config() -> Value {
    json!({
        "station_id": "s1",
        "install_date": "2023-05-01",
        "tz": "ET",
        "sn": "spec-1",
        "apikey": "spec-key"
    })
}

pub fn zentra_config() -> Value {
    json!({
        "station_id": "z1",
        "install_date": "2023-05-01",
        "tz": "MT",
        "sn": "z6-00001",
        "token": "zentra-token"
    })
}

pub fn locomos_config() -> Value {
    json!({
        "station_id": "l1",
        "install_date": "2023-05-01",
        "tz": "ET",
        "token": "locomos-token",
        "id": "dev-1"
    })
}

pub fn generic_config() -> Value {
    json!({
        "station_id": "g1",
        "install_date": "2023-05-01",
        "note": "bench unit"
    })
}

pub fn station_config(station_type: StationType) -> Value {
    match station_type {
        StationType::Zentra => zentra_config(),
        StationType::Onset => onset_config(),
        StationType::Davis => davis_config(),
        StationType::Rainwise => rainwise_config(),
        StationType::Spectrum => spectrum_config(),
        StationType::Locomos => locomos_config(),
        StationType::Generic => generic_config(),
    }
}

/// Two outdoor records plus a barometer record without `temp_out`.
pub const DAVIS_PAYLOAD: &str = r#"{
    "station_id": 12345,
    "sensors": [
        {
            "lsid": 1,
            "sensor_type": 24,
            "data": [
                {"ts": 1672531200, "temp_out": 32.0, "hum_out": 55.0, "rainfall_mm": 1.2, "rainfall_in": 0.05},
                {"ts": 1672532100, "temp_out": 50.0, "hum_out": 60.0, "rainfall_in": 0.1}
            ]
        },
        {
            "lsid": 2,
            "sensor_type": 242,
            "data": [
                {"ts": 1672531200, "bar_sea_level": 30.1}
            ]
        }
    ]
}"#;

pub const ONSET_PAYLOAD: &str = r#"{
    "message": "OK",
    "observation_list": [
        {"logger_sn": "21092695", "sensor_sn": "21079936-1", "timestamp": "2023-06-01 12:00:00Z", "si_value": 21.5},
        {"logger_sn": "21092695", "sensor_sn": "21079936-2", "timestamp": "2023-06-01 12:00:00Z", "si_value": 65.0},
        {"logger_sn": "21092695", "sensor_sn": "21085496-1", "timestamp": "2023-06-01 12:00:00Z", "si_value": 0.2},
        {"logger_sn": "21092695", "sensor_sn": "21079936-1", "timestamp": "2023-06-01 12:05:00Z", "si_value": 21.7},
        {"logger_sn": "21092695", "sensor_sn": "99999999-9", "timestamp": "2023-06-01 12:05:00Z", "si_value": 3.3}
    ]
}"#;

pub const RAINWISE_PAYLOAD: &str = r#"{"station_id":"r1","times":{"0":"2023-01-01T00:00:00Z"},"temp":{"0":"32"},"precip":{"0":"1"},"hum":{"0":"50"}}"#;

pub const SPECTRUM_PAYLOAD: &str = r#"{
    "Message": "Success",
    "EquipmentRecords": [
        {
            "TimeStamp": "2023-01-01T07:00:00",
            "SensorData": [
                {"Label": "Rainfall", "DecimalValue": 0.1},
                {"Label": "Temperature", "DecimalValue": 68.0},
                {"Label": "Relative Humidity", "DecimalValue": 80.0}
            ]
        },
        {
            "TimeStamp": "2023-01-01T07:05:00",
            "SensorData": [
                {"Label": "Rainfall", "DecimalValue": 0.0},
                {"Label": "Temperature", "DecimalValue": 68.5},
                {"Label": "Relative Humidity", "DecimalValue": 79.5}
            ]
        }
    ]
}"#;

/// Precipitation and humidity only report the first timestamp.
pub const ZENTRA_PAYLOAD: &str = r#"{
    "pagination": {"page_num": 1},
    "data": {
        "Air Temperature": [
            {"metadata": {"units": " °C"}, "readings": [
                {"timestamp_utc": 1685620800, "value": 21.3},
                {"timestamp_utc": 1685621100, "value": 21.6}
            ]}
        ],
        "Precipitation": [
            {"metadata": {"units": " mm"}, "readings": [
                {"timestamp_utc": 1685620800, "value": 0.0}
            ]}
        ],
        "Relative Humidity": [
            {"metadata": {"units": " RH"}, "readings": [
                {"timestamp_utc": 1685620800, "value": 0.61}
            ]}
        ],
        "Battery Percent": [
            {"metadata": {"units": " %"}, "readings": [
                {"timestamp_utc": 1685620800, "value": 98}
            ]}
        ]
    }
}"#;

pub const LOCOMOS_VARIABLES: &str = r#"{
    "count": 3,
    "results": [
        {"id": "6410e8564a53ce000ec46e46", "label": "temp", "name": "Temperature"},
        {"id": "6410e8564a53ce000ec46e47", "label": "rh", "name": "Relative Humidity"},
        {"id": "6410e8564a53ce000ec46e48", "label": "prep", "name": "Precipitation"}
    ]
}"#;

pub fn locomos_variables() -> BTreeMap<String, String> {
    [
        ("6410e8564a53ce000ec46e46", "temp"),
        ("6410e8564a53ce000ec46e47", "rh"),
        ("6410e8564a53ce000ec46e48", "prep"),
    ]
    .into_iter()
    .map(|(id, label)| (id.to_string(), label.to_string()))
    .collect()
}

/// Raw series response: one column block per variable.
pub const LOCOMOS_PAYLOAD: &str = r#"{
    "columns": [
        ["timestamp", "device.name", "device.label",
         "6410e8564a53ce000ec46e46.variable.id", "6410e8564a53ce000ec46e46.variable.name",
         "6410e8564a53ce000ec46e46.value.value"],
        ["timestamp", "device.name", "device.label",
         "6410e8564a53ce000ec46e47.variable.id", "6410e8564a53ce000ec46e47.variable.name",
         "6410e8564a53ce000ec46e47.value.value"],
        ["timestamp", "device.name", "device.label",
         "6410e8564a53ce000ec46e48.variable.id", "6410e8564a53ce000ec46e48.variable.name",
         "6410e8564a53ce000ec46e48.value.value"]
    ],
    "results": [
        [
            [1685620800000, "Locomos 1", "locomos-1", "6410e8564a53ce000ec46e46", "Temperature", 22.5],
            [1685621100000, "Locomos 1", "locomos-1", "6410e8564a53ce000ec46e46", "Temperature", 22.75]
        ],
        [
            [1685620800000, "Locomos 1", "locomos-1", "6410e8564a53ce000ec46e47", "Relative Humidity", 71.0]
        ],
        [
            [1685620800000, "Locomos 1", "locomos-1", "6410e8564a53ce000ec46e48", "Precipitation", 0.0]
        ]
    ]
}"#;

pub const STATION_CSV: &str = "station_id,station_type,install_date,tz,station_config
r1,RAINWISE,2023-05-01,ET,'{\"sid\":\"S\",\"pid\":\"P\",\"mac\":\"M\",\"ret_form\":\"json\"}'
d1,DAVIS,2023-05-01,CT,'{\"sn\":\"12345\",\"apikey\":\"k\",\"apisec\":\"s\"}'
z1,ZENTRA,2023-05-01,MT,'{\"sn\":\"z6-00001\",\"token\":\"t\"}'
";
