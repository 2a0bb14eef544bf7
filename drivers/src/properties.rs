pub struct Probe<Configuration> {
    pub name: &'static str,
    pub channel_count: usize,
    pub converter_count: usize,
    pub default_configuration: Configuration,
}
