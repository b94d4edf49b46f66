#[derive(Clone, Debug)]
pub struct ApplicationConfig {
    pub host: String,
    pub port: u16,
}

impl ApplicationConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
