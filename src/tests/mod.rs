mod documents;
mod test_user;
mod update;
mod visibility;
