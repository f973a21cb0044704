pub fn about() -> Vec<String> {
    vec![
        "Grabs screen captures from Teledyne LeCroy oscilloscopes running MAUI \
        and saves them as JPEG files.".to_string(),
        "\n".to_string(),
        "Connect over VICP (VICP::<host>) or, when built with the `visa` feature, \
        any NI-VISA resource.".to_string(),
        "Put {timestamp} in the file name to get a new file for every capture.".to_string(),
        "\n".to_string(),
        "This program comes with ABSOLUTELY NO WARRANTY.".to_string(),
    ]
}
