//! Domain models shared by the store, the services and the HTTP layer.

pub mod catalog;
pub mod employee;
pub mod order;
pub mod payment;
pub mod settings;

pub use catalog::{
    AddToCart, AddToWishlist, CartItem, CartLine, NewProduct, Product, ProductUpdate,
    UpdateCartQuantity, WishlistEntry,
};
pub use employee::{
    AssignStock, Employee, EmployeeLedger, EmployeeView, Holding, NewEmployee, RecordSale,
    StockLog, UpdateEmployee,
};
pub use order::{
    Order, OrderItem, OrderPayment, OrderWithItems, PaymentConfirmation, PlaceOrderInput,
    PlacedOrder, UpdateOrderStatus,
};
pub use payment::{Payment, PaymentVerification, RegisterPayment};
pub use settings::{SettingsUpdate, StoreSettings};
