#[rocket::launch]
fn rocket() -> _ {
    accounts_api::rocket()
}
