mod service_port;
