pub mod multi_send;
pub mod proxy_factory;
pub mod safe;
pub mod sign_message_lib;

pub use self::multi_send::MultiSendCallOnly;
pub use self::proxy_factory::ProxyFactory;
pub use self::safe::Safe;
pub use self::sign_message_lib::SignMessageLib;
